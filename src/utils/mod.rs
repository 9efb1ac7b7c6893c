pub mod adaptive_buffer;
