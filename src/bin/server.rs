//! Chat server binary.
//! Run with: cargo run --bin chatbot-server

use std::process::ExitCode;

use chatbot_ai::start_chatbot;

fn main() -> ExitCode {
    start_chatbot::run()
}
