pub mod dataflow;
