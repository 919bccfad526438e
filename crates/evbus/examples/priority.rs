use evbus::{Config, EventManager, Payload, Priority};

const EVENT_TEST: u32 = 0;
const EVENT_TASK: u32 = 1;

fn demo_subscriber_priority(bus: &EventManager) {
    println!(">>> Subscriber priority");
    println!("----------------------------------------");
    println!("Three handlers subscribe out of order; delivery runs high,");
    println!("normal, low regardless of subscription order.\n");

    bus.subscribe_fn(EVENT_TEST, Priority::Low, |_, _| {
        println!("  [low]    runs last");
    })
    .unwrap();
    bus.subscribe_fn(EVENT_TEST, Priority::High, |_, _| {
        println!("  [high]   runs first");
    })
    .unwrap();
    bus.subscribe_fn(EVENT_TEST, Priority::Normal, |_, _| {
        println!("  [normal] runs second");
    })
    .unwrap();

    bus.publish_sync(EVENT_TEST, &Payload::Empty).unwrap();
    bus.unsubscribe_all(EVENT_TEST).unwrap();
}

fn demo_event_priority(bus: &EventManager) {
    println!("\n>>> Async event priority");
    println!("----------------------------------------");
    println!("Events queued low-first still drain high-first.\n");

    bus.subscribe_fn(EVENT_TASK, Priority::Normal, |_, payload| {
        let task = payload.downcast_ref::<&str>().copied().unwrap_or("?");
        println!("  processing: {task}");
    })
    .unwrap();

    bus.publish_async(EVENT_TASK, Payload::shared("background sync"), Priority::Low)
        .unwrap();
    bus.publish_async(EVENT_TASK, Payload::shared("refresh display"), Priority::Normal)
        .unwrap();
    bus.publish_async(EVENT_TASK, Payload::shared("overcurrent alarm"), Priority::High)
        .unwrap();

    println!("Queued: {} events, draining...", bus.queue_size());
    let drained = bus.process_all();
    println!("Drained {drained} events");
}

fn main() {
    env_logger::init();

    println!("evbus Priority Example");
    println!("======================\n");

    let bus = EventManager::new(Config::default());
    demo_subscriber_priority(&bus);
    demo_event_priority(&bus);
}
