//! metalbasis - Tax-lot report for precious-metals ETF shares.

fn main() -> std::process::ExitCode {
    metalbasis::cmd::report_cmd::main()
}
