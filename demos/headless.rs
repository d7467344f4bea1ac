use std::sync::Arc;
use std::time::Duration;
use tileview::{
    FetchOutcome, FrameRecorder, QueuedFetcher, TilePayload, TileSource, Viewport, ViewerEvent,
    ViewportOptions,
};

const MAP_CONFIG: &str = r#"{
    "tile_url": "/tile",
    "image_url": "/image",
    "tile_size": 256,
    "zoom_min": -4,
    "zoom_max": 1,
    "image_width": 20000,
    "image_height": 14000
}"#;

/// Example of driving a viewport without any UI or network
fn main() -> tileview::Result<()> {
    #[cfg(feature = "debug")]
    tileview::init_logging();

    println!("Tileview Headless Example");
    println!("=========================");

    let source = Arc::new(TileSource::from_json(MAP_CONFIG)?);
    let options = ViewportOptions::default().with_view_size(1024, 768).with_initial_zoom(-2);
    let fragment = std::env::args().nth(1).unwrap_or_default();
    let mut viewport = Viewport::from_fragment(source, options, QueuedFetcher::new(), &fragment)?;

    println!("Viewport created:");
    println!("   Zoom: {}", viewport.active_zoom());
    println!("   Center: {:?}", viewport.center());
    println!("   Link: #{}", viewport.fragment());

    let mut clock = viewport.now();
    let mut frame = FrameRecorder::new();

    let gestures = [
        ("drag", vec![ViewerEvent::DragStart, ViewerEvent::DragMove { dx: -120, dy: 40 }, ViewerEvent::DragEnd]),
        ("wheel in", vec![ViewerEvent::Wheel { delta: 120, offset_x: 512, offset_y: 384 }]),
        ("double click", vec![ViewerEvent::DoubleClick { offset_x: 100, offset_y: 100 }]),
        ("zoom out", vec![ViewerEvent::ZoomOut, ViewerEvent::ZoomOut]),
        ("resize", vec![ViewerEvent::Resize { width: 1280, height: 800 }]),
    ];

    for (name, events) in gestures {
        clock += Duration::from_millis(16);
        viewport.handle_events(events, clock);

        // pretend the tile server answers every request
        for (key, _) in viewport.fetcher_mut().take_requests() {
            let bytes = format!("{}", key).into_bytes();
            viewport
                .fetcher_mut()
                .complete(key, FetchOutcome::Loaded(TilePayload::new(bytes).with_content_type("image/png")));
        }

        for _ in 0..4 {
            clock += Duration::from_millis(300);
            viewport.tick(clock);
        }

        let drawn = viewport.render(&mut frame);
        let link = viewport.image_link();
        println!(
            "   {:<12} z{} scroll {:?} layers {:?} drawn {} ({})",
            name,
            viewport.active_zoom(),
            viewport.scroll(),
            viewport.enabled_levels(),
            drawn,
            link.label
        );
    }

    println!("\nTotal requests: {}", viewport.fetcher().total_requests());
    println!("Share link: #{}", viewport.fragment());
    println!("Image link: {}", viewport.image_link().locator);

    Ok(())
}
