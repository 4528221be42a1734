use std::path::Path;

use isaric_data::IsaricData;

mod encode_project;
mod skip_logic_project;

/// Load the synthetic project from the loader's fixtures.
pub fn fixture_project() -> IsaricData {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../isaric-loader/tests/fixtures/data");
    isaric_loader::load_data_from_file(dir, true).expect("Fixture project should load")
}
