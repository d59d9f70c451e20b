use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use luma_core::scheduler::{EventTag, Scheduler};

fn bench_scheduler(c: &mut Criterion) {
    let mut group = c.benchmark_group("Scheduler");

    for event_count in [2u64, 8u64].iter() {
        group.bench_with_input(BenchmarkId::new("schedule_and_drain", event_count), event_count, |b, count| {
            b.iter(|| {
                let mut scheduler = Scheduler::new();

                for i in 0..*count {
                    scheduler.schedule_event(EventTag::HBlank, (i * 1232).into());
                }

                scheduler.add_time(u32::MAX);
                while scheduler.pop_current().is_some() {}
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scheduler);
criterion_main!(benches);
