mod response;

pub use response::{command_outcome, print_json_result};
