pub mod compressor;
pub mod packet_processor;
pub mod sample_extractor;
