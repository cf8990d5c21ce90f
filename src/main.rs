use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    pionier::cli::main()
}
