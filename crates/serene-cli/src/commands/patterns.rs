use serene_core::BreathingPattern;

pub fn run() -> serene_core::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(BreathingPattern::all())?
    );
    Ok(())
}
