fn main() -> Result<(), Box<dyn std::error::Error>> {
    email_rewriter::run()
}
