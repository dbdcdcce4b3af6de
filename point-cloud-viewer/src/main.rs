use point_cloud_viewer::engine::core::app_setup::create_app;

#[cfg(not(target_arch = "wasm32"))]
use point_cloud_viewer::engine::buffer::point_feed::PointFeed;

fn main() {
    let mut app = create_app();

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            app.run();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        // Without a host page, feed a synthetic frame stream.
        if std::env::var_os("POINT_CLOUD_DEMO").is_some() {
            let feed = app.world().resource::<PointFeed>().clone();
            spawn_demo_producer(feed);
        }
        app.run();
    }
}

/// Rippling sheet of points in the ground plane, resubmitted at ~30 Hz.
#[cfg(not(target_arch = "wasm32"))]
fn spawn_demo_producer(feed: PointFeed) {
    std::thread::spawn(move || {
        let started = std::time::Instant::now();
        loop {
            feed.submit(demo_frame(160, 90, started.elapsed().as_secs_f32()));
            std::thread::sleep(std::time::Duration::from_millis(33));
        }
    });
}

#[cfg(not(target_arch = "wasm32"))]
fn demo_frame(columns: u32, rows: u32, seconds: f32) -> Vec<f32> {
    let mut points = Vec::with_capacity((columns * rows * 3) as usize);
    for row in 0..rows {
        for column in 0..columns {
            let x = column as f32 / columns as f32 * 8.0 - 4.0;
            let y = row as f32 / rows as f32 * 4.5 - 2.25;
            let z = 0.5 + 0.25 * ((x * x + y * y).sqrt() * 2.0 - seconds * 3.0).sin();
            points.extend_from_slice(&[x, y, z]);
        }
    }
    points
}
