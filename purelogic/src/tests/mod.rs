mod value;

// Parser tests
mod parser;

mod fixpoint;
mod metalogic;
