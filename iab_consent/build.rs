use proc_macro2::TokenStream;
use quote::quote;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::{env, fs};
use walkdir::WalkDir;

const FIXTURE_DIR: &str = "tests/data";
const GENERATED_FILE: &str = "consent_fixture_tests.rs";

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed={FIXTURE_DIR}");

    let fixtures = consent_fixtures();
    for path in &fixtures {
        println!("cargo:rerun-if-changed={}", path.display());
    }

    let out_dir = env::var("OUT_DIR")?;
    fs::write(
        Path::new(&out_dir).join(GENERATED_FILE),
        render_fixture_tests(&fixtures)?,
    )?;

    Ok(())
}

/// Consent string fixtures, sorted by file name so the generated file is stable.
fn consent_fixtures() -> Vec<PathBuf> {
    WalkDir::new(FIXTURE_DIR)
        .sort_by_file_name()
        .into_iter()
        .flatten()
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect()
}

fn render_fixture_tests(fixtures: &[PathBuf]) -> Result<String, Box<dyn Error>> {
    let cases = fixtures.iter().filter_map(|path| fixture_case(path));
    let tokens = quote! {
        use test_case::test_case;

        #(#cases)*
        fn decodes_consent_fixture(path: &str) {
            crate::common::TestCase::load_from_file(path)
                .unwrap()
                .assert_decodes_as_expected();
        }
    };

    Ok(prettyplease::unparse(&syn::parse2(tokens)?))
}

fn fixture_case(path: &Path) -> Option<TokenStream> {
    let file = path.to_str()?;
    let name = path.file_stem()?.to_str()?;
    Some(quote! {
        #[test_case(#file ; #name)]
    })
}
