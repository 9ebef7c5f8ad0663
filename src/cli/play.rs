use std::error::Error;

pub fn handle_play(track_path: Option<&str>) -> Result<(), Box<dyn Error>> {
    #[cfg(feature = "player")]
    {
        crate::player::run(track_path)
    }

    #[cfg(not(feature = "player"))]
    {
        let _ = track_path;
        use owo_colors::OwoColorize;
        println!(
            "{} The terminal player requires the 'player' feature to be enabled.",
            "Note:".yellow()
        );
        println!();
        println!("To enable it, build with:");
        println!("  {}", "cargo build --release --features player".cyan());

        Ok(())
    }
}
