use evbus::{Config, EventManager, Payload, Priority};

const EVENT_HELLO: u32 = 0;
const EVENT_GOODBYE: u32 = 1;
const EVENT_DATA: u32 = 2;

fn main() {
    env_logger::init();

    println!("evbus Basic Example");
    println!("===================\n");
    println!("Version: {}\n", evbus::version());

    let bus = EventManager::new(Config::default());

    // Subscribe handlers; captured state replaces the C-style user pointer.
    bus.subscribe_fn(EVENT_HELLO, Priority::Normal, |_, payload| {
        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .unwrap_or("(no message)");
        println!("[hello] {message}");
    })
    .unwrap();

    let username = String::from("alice");
    bus.subscribe_fn(EVENT_GOODBYE, Priority::Normal, move |_, _| {
        println!("[goodbye] see you, {username}!");
    })
    .unwrap();

    bus.subscribe_fn(EVENT_DATA, Priority::Normal, |_, payload| {
        if let Some(value) = payload.downcast_ref::<i32>() {
            println!("[data] received {value}");
        }
    })
    .unwrap();

    println!("Subscribers:");
    for id in [EVENT_HELLO, EVENT_GOODBYE, EVENT_DATA] {
        println!("  event {id}: {}", bus.subscriber_count(id).unwrap());
    }

    // Synchronous publishes run the handlers before returning.
    println!("\nPublishing...");
    bus.publish_sync(EVENT_HELLO, &Payload::shared("hello, event manager"))
        .unwrap();
    bus.publish_sync(EVENT_DATA, &Payload::shared(42i32)).unwrap();
    bus.publish_sync(EVENT_GOODBYE, &Payload::Empty).unwrap();

    let stats = bus.stats();
    println!("\nStats:");
    println!("  published:   {}", stats.events_published);
    println!("  processed:   {}", stats.events_processed);
    println!("  subscribers: {}", stats.subscribers_total);
}
