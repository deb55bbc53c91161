fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Emit version information for the About page
    vergen::EmitBuilder::builder()
        .git_sha(true)
        .git_commit_date()
        .emit()?;

    println!("cargo:rerun-if-env-changed=VERGEN_GIT_COMMIT_DATE");
    println!("cargo:rerun-if-env-changed=VERGEN_GIT_SHA");

    Ok(())
}
