use evbus::{Config, EventManager, Payload, Priority};

const EVENT_SYNC_MSG: u32 = 0;
const EVENT_ASYNC_MSG: u32 = 1;
const EVENT_SENSOR: u32 = 2;

#[derive(Debug)]
struct SensorReading {
    sensor_id: u8,
    temperature: f32,
    humidity: f32,
}

fn main() {
    env_logger::init();

    println!("evbus Sync vs Async Example");
    println!("===========================\n");

    let bus = EventManager::new(Config::default());

    bus.subscribe_fn(EVENT_SYNC_MSG, Priority::Normal, |_, payload| {
        println!("  [sync handler] {}", payload.downcast_ref::<&str>().unwrap());
    })
    .unwrap();
    bus.subscribe_fn(EVENT_ASYNC_MSG, Priority::Normal, |_, payload| {
        println!("  [async handler] {}", payload.downcast_ref::<&str>().unwrap());
    })
    .unwrap();

    // Sync: the handler has already run when publish_sync returns.
    println!("publishing sync event...");
    bus.publish_sync(EVENT_SYNC_MSG, &Payload::shared("delivered immediately"))
        .unwrap();
    println!("publish_sync returned\n");

    // Async: nothing happens until the queue is drained.
    println!("publishing async event...");
    bus.publish_async(EVENT_ASYNC_MSG, Payload::shared("delivered on drain"), Priority::Normal)
        .unwrap();
    println!("publish_async returned, queue size = {}", bus.queue_size());
    println!("draining...");
    bus.process_all();

    // Owned byte copies isolate the queued event from later mutation.
    println!("\npublishing sensor frame as an owned copy...");
    bus.subscribe_fn(EVENT_SENSOR, Priority::Normal, |_, payload| {
        let bytes = payload.as_bytes().unwrap();
        println!(
            "  [sensor handler] id={} t={:.1}C rh={:.1}%",
            bytes[0],
            f32::from_le_bytes(bytes[1..5].try_into().unwrap()),
            f32::from_le_bytes(bytes[5..9].try_into().unwrap()),
        );
    })
    .unwrap();

    let reading = SensorReading {
        sensor_id: 3,
        temperature: 21.5,
        humidity: 48.0,
    };
    let mut frame = Vec::with_capacity(9);
    frame.push(reading.sensor_id);
    frame.extend_from_slice(&reading.temperature.to_le_bytes());
    frame.extend_from_slice(&reading.humidity.to_le_bytes());

    bus.publish_async_bytes(EVENT_SENSOR, &frame, Priority::High).unwrap();

    // Scribbling over the frame cannot reach the queued copy.
    frame.fill(0);
    bus.process_all();

    let stats = bus.stats();
    println!("\nStats: published={} processed={}", stats.events_published, stats.events_processed);
}
