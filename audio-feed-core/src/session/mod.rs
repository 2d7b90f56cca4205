pub mod capture_loop;
pub mod stop;
pub mod worker;
