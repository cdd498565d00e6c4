use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use depot_core::{AggregateId, UserId};
use depot_events::{EventEnvelope, InMemoryEventBus};
use depot_infra::command_dispatcher::CommandDispatcher;
use depot_infra::event_store::InMemoryEventStore;
use depot_infra::projections::PRODUCT_STREAM;
use depot_inventory::{
    IssueStock, OutboundKind, Product, ProductCommand, ProductId, ReceiveStock, RegisterProduct,
};

type BenchDispatcher =
    CommandDispatcher<InMemoryEventStore, Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>>>;

fn setup_dispatcher() -> BenchDispatcher {
    let store = InMemoryEventStore::new();
    let bus: Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>> =
        Arc::new(InMemoryEventBus::new());
    CommandDispatcher::new(store, bus)
}

fn bench_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 9).unwrap()
}

fn register(dispatcher: &BenchDispatcher) -> ProductId {
    let agg = AggregateId::new();
    let product_id = ProductId::new(agg);
    dispatcher
        .dispatch(
            agg,
            PRODUCT_STREAM,
            ProductCommand::RegisterProduct(RegisterProduct {
                product_id,
                name: "Bench Product".to_string(),
                brand: "Bench".to_string(),
                stock_minimum: 5,
                sale_price_cents: 1000,
                occurred_at: Utc::now(),
            }),
            |id| Product::empty(ProductId::new(id)),
        )
        .expect("register failed");
    product_id
}

fn receive(dispatcher: &BenchDispatcher, product_id: ProductId, quantity: i64) {
    dispatcher
        .dispatch(
            product_id.0,
            PRODUCT_STREAM,
            ProductCommand::ReceiveStock(ReceiveStock {
                product_id,
                supplier_id: None,
                quantity,
                unit_cost_cents: 500,
                lot_number: None,
                entry_date: bench_date(),
                expiry_date: None,
                received_by: None,
                notes: None,
                recorded_by: UserId::new(),
                occurred_at: Utc::now(),
            }),
            |id| Product::empty(ProductId::new(id)),
        )
        .expect("receive failed");
}

fn issue(dispatcher: &BenchDispatcher, product_id: ProductId, quantity: i64) {
    dispatcher
        .dispatch(
            product_id.0,
            PRODUCT_STREAM,
            ProductCommand::IssueStock(IssueStock {
                product_id,
                quantity,
                kind: OutboundKind::Sale,
                destination: None,
                unit_price_cents: None,
                responsible: None,
                notes: None,
                exit_date: bench_date(),
                recorded_by: UserId::new(),
                occurred_at: Utc::now(),
            }),
            |id| Product::empty(ProductId::new(id)),
        )
        .expect("issue failed");
}

fn bench_register_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_latency");
    group.sample_size(500);

    group.bench_function("register_product_fresh", |b| {
        let dispatcher = setup_dispatcher();
        b.iter(|| {
            let id = register(black_box(&dispatcher));
            black_box(id)
        });
    });

    group.finish();
}

/// Each movement dispatch rehydrates the product from its full stream, so
/// latency grows with ledger depth. This tracks how fast.
fn bench_issue_latency_by_stream_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("issue_latency_by_stream_depth");

    for depth in [10u64, 100, 1000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            let dispatcher = setup_dispatcher();
            let product_id = register(&dispatcher);
            // Preload the stream: `depth` receives of 1 unit each plus a
            // large float of stock to issue from.
            receive(&dispatcher, product_id, 1_000_000);
            for _ in 0..depth {
                receive(&dispatcher, product_id, 1);
            }

            b.iter(|| issue(black_box(&dispatcher), product_id, 1));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_register_latency,
    bench_issue_latency_by_stream_depth
);
criterion_main!(benches);
