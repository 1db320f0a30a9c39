fn main() {
    // The trace destination is a build-time contract: a missing value must
    // fail the build, never fall back at runtime.
    println!("cargo:rerun-if-env-changed=MEMTRACE_LOG_FILE");
    match std::env::var("MEMTRACE_LOG_FILE") {
        Ok(path) if !path.is_empty() => {
            println!("cargo:rustc-env=MEMTRACE_LOG_FILE={path}");
        }
        _ => panic!(
            "MEMTRACE_LOG_FILE is not set. Define the path the allocation trace \
             is written to, e.g. `MEMTRACE_LOG_FILE=/tmp/memtrace.csv cargo build \
             -p memtrace-abi`. The target directory must already exist."
        ),
    }
}
