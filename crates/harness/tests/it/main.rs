#![allow(missing_docs)]

mod http;
mod run;
pub mod utils;

const fn main() {}
