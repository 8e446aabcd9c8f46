use cornice_windows::control;

/// Installs (or, with no handles, clears) an explicit target-window
/// override in the running engine.
pub fn execute(handles: Vec<String>) {
    let payload = if handles.is_empty() {
        "HWNDS".to_string()
    } else {
        format!("HWNDS {}", handles.join(" "))
    };

    match control::send_text(&payload) {
        Ok(()) if handles.is_empty() => println!("Target override cleared."),
        Ok(()) => println!("Targeting {} window(s).", handles.len()),
        Err(e) => eprintln!("{e}"),
    }
}
