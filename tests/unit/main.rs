//! Unit tests for the library's public building blocks

mod codec_test;
mod pipeline_test;
