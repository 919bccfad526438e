use evbus::{Config, Error, EventManager, Payload, Priority};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const N_SENSORS: usize = 3;
const READINGS_PER_SENSOR: usize = 50;

fn main() {
    env_logger::init();

    println!("evbus Multithread Example");
    println!("=========================\n");
    println!("Sensors: {N_SENSORS}, readings per sensor: {READINGS_PER_SENSOR}\n");

    let bus = EventManager::new(Config::default());
    let received = Arc::new(AtomicUsize::new(0));

    for sensor in 0..N_SENSORS as u32 {
        let received = Arc::clone(&received);
        bus.subscribe_fn(sensor, Priority::Normal, move |event_id, payload| {
            let value = payload.downcast_ref::<i32>().copied().unwrap_or(0);
            let count = received.fetch_add(1, Ordering::SeqCst) + 1;
            println!("[sensor {event_id}] value={value} (total received: {count})");
        })
        .unwrap();
    }

    // Dedicated consumer blocks in the event loop.
    let looper = bus.clone();
    let consumer = thread::spawn(move || looper.run_loop());

    let start = Instant::now();

    // Each producer publishes from its own thread with a payload the
    // manager passes through by refcount.
    let mut producers = vec![];
    for sensor in 0..N_SENSORS {
        let publisher = bus.clone();
        producers.push(thread::spawn(move || {
            for seq in 0..READINGS_PER_SENSOR {
                let value = (sensor * 1000 + seq) as i32;
                loop {
                    match publisher.publish_async(
                        sensor as u32,
                        Payload::shared(value),
                        Priority::Normal,
                    ) {
                        Ok(()) => break,
                        Err(Error::QueueFull) => thread::yield_now(),
                        Err(err) => {
                            eprintln!("publish failed: {err}");
                            return;
                        }
                    }
                }
                thread::sleep(Duration::from_millis(1));
            }
            println!("[producer {sensor}] done");
        }));
    }

    for producer in producers {
        producer.join().unwrap();
    }

    // Let the loop drain the tail, then stop it.
    let total = N_SENSORS * READINGS_PER_SENSOR;
    while received.load(Ordering::SeqCst) < total {
        thread::yield_now();
    }
    bus.stop_loop();
    consumer.join().unwrap().unwrap();

    let stats = bus.stats();
    println!("\nResults:");
    println!("  received:   {}", received.load(Ordering::SeqCst));
    println!("  published:  {}", stats.events_published);
    println!("  processed:  {}", stats.events_processed);
    println!("  queue peak: {}", stats.async_queue_max);
    println!("  elapsed:    {:.2?}", start.elapsed());
}
