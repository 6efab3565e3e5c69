pub mod header;
pub mod results_list;
pub mod upload_form;
