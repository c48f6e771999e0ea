//! The "sketch" drawing language: lexer, parser, bytecode compiler and interpreter.

pub(crate) mod ast;
pub(crate) mod bytecode;
pub(crate) mod codegen;
pub(crate) mod color;
pub(crate) mod error;
pub(crate) mod lexer;
pub(crate) mod parser;
pub(crate) mod vm;
