use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("lectern")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Lectern Contributors")
        .about("Turn web pages into clean, reader-mode HTML")
        .arg(clap::arg!(<INPUT> "URL to fetch, local HTML file, or '-' for stdin"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (html, markdown, text, json)")
                .value_name("FORMAT")
                .default_value("html")
                .value_parser(["html", "markdown", "md", "text", "txt", "json"]),
        )
        .arg(clap::arg!(--url <URL> "Document URL used to resolve relative links (required for stdin)"))
        .arg(
            clap::arg!(--options <FILE> "JSON options file (default: the user config directory, if present)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(clap::arg!(--"image-timeout" <MS> "Per-image size probe timeout in milliseconds (0 waits indefinitely)"))
        .arg(clap::arg!(--"no-image-fetch" "Infer image sizes from markup only, never over the network"))
        .arg(clap::arg!(--"preserve-embeds" "Keep iframe, embed and object elements"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "lectern", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "lectern", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "lectern", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "lectern", &completions_dir).unwrap();

    println!("cargo:warning=Shell completions generated in: {}", completions_dir.display());
}
