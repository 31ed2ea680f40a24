pub mod ast;
pub mod context;
pub mod diagnostics;
pub mod edit;
pub mod fix;
pub mod harness;
pub mod matchers;
pub mod parser;
pub mod scan;
pub mod sig;
pub mod source;
pub mod span;
pub mod token;
