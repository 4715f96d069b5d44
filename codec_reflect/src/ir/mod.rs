mod interpreter;

pub use interpreter::CodecInterpreter;
