// Expression evaluation tests
mod eval;
// Rule workspace tests
mod run;
mod rule_tests;
// Server command tests
mod server;
