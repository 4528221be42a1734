mod errors;
mod load_project;
