mod integration;
mod parser_tests;
