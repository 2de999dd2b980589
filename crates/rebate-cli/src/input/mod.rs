pub mod file;
pub mod stdin;
pub mod table_file;
