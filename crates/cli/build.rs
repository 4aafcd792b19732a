use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("quire")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Send web articles and saved HTML pages to your Kindle as ePub")
        .arg(clap::arg!([URL] "URL of the article to send (omit for interactive mode)").conflicts_with("file"))
        .arg(
            clap::arg!(--file <PATH> "Path to a local HTML file to send")
                .value_name("PATH")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--no_send "Only generate the ePub file, do not send it"))
        .arg(
            clap::arg!(--output_dir <DIR> "Directory for the ePub file (default: EPUB_OUTPUT_DIR)")
                .value_name("DIR")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--debug_extraction "Only extract and print the article"))
        .arg(clap::arg!(--json "Print the extracted article as JSON and exit"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--user_agent <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(clap::arg!(--no_readability "Skip the readability pass and use selector-based extraction only"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "quire", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "quire", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "quire", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "quire", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
