use cornice_windows::control;

/// Delivers `key=value` settings tokens to the running engine.
pub fn execute(tokens: Vec<String>) {
    if tokens.is_empty() {
        eprintln!("nothing to send; expected tokens like color=#00ccff thickness=3");
        return;
    }

    let payload = tokens.join(" ");
    match control::send_text(&payload) {
        Ok(()) => println!("Sent: {payload}"),
        Err(e) => eprintln!("{e}"),
    }
}
