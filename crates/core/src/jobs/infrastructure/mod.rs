pub mod in_memory_run_store;
pub mod json_file_run_store;
