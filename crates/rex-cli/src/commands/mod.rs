pub mod call;
pub mod demo;
pub mod repl;
pub mod serve;
