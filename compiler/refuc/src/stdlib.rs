//! The implicit standard library module.
//!
//! The root module depends on it automatically. Everything here is a
//! bare declaration: the functions are provided by the runtime, so they
//! take part in name and type resolution but produce no RIR bodies.

pub const STDLIB_MODULE_NAME: &str = "stdlib";

pub const STDLIB_SOURCE: &str = "\
fn print(s:string) -> nil
fn print_i64(v:i64) -> nil
fn print_u64(v:u64) -> nil
fn print_f64(v:f64) -> nil
fn print_bool(v:bool) -> nil
";
