mod app;
mod memory;
mod util;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to a memory archive JSON export.
    #[arg(long)]
    archive: String,
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "memograph",
        options,
        Box::new(move |cc| Ok(Box::new(app::MemographApp::new(cc, args.archive.clone())))),
    )
}
