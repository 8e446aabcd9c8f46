use cornice_windows::control;

/// Reports whether a border engine is running on this desktop.
pub fn execute() {
    match control::engine_window() {
        Some(_) => println!("cornice is running."),
        None => println!("cornice is not running."),
    }
}
