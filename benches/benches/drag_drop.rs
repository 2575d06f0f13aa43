// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{
    BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main,
};
use kurbo::{Point, Rect};
use understory_drag_drop::collision::{
    CollisionContext, CollisionDetector, CollisionItem, closest_center, closest_corners,
    most_intersecting,
};
use understory_drag_drop::{DragDrop, Element, Layout, NewItem};
use understory_sortable::SortableContext;

/// A fixed cell in a square grid of 40px cells.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct Cell(u32, u32);

impl Element for Cell {
    fn bounding_rect(&self) -> Rect {
        let x = f64::from(self.0 % self.1) * 40.0;
        let y = f64::from(self.0 / self.1) * 40.0;
        Rect::new(x, y, x + 32.0, y + 32.0)
    }
}

fn grid(len: u32) -> Vec<CollisionItem<u32>> {
    let cols = (f64::from(len).sqrt() as u32).max(1);
    (0..len)
        .map(|i| CollisionItem::new(i, Layout::from_rect(Cell(i, cols).bounding_rect())))
        .collect()
}

fn engine(len: u32) -> DragDrop<u32, Cell> {
    let cols = (f64::from(len).sqrt() as u32).max(1);
    let mut dnd = DragDrop::default();
    dnd.add_sensor(u32::MAX, []);
    dnd.batch(|dnd| {
        for i in 0..len {
            let node = Cell(i, cols);
            let layout = Layout::from_rect(node.bounding_rect());
            dnd.add_draggable(NewItem {
                id: i,
                node: node.clone(),
                layout,
                data: (),
            });
            dnd.add_droppable(NewItem {
                id: i,
                node,
                layout,
                data: (),
            });
        }
    });
    dnd
}

fn bench_detectors(c: &mut Criterion) {
    let mut group = c.benchmark_group("drag_drop/detect");

    let detectors: [(&str, CollisionDetector<u32>); 3] = [
        ("closest_center", closest_center),
        ("closest_corners", closest_corners),
        ("most_intersecting", most_intersecting),
    ];

    for len in [64_u32, 1_024, 16_384] {
        let droppables = grid(len);
        let active = CollisionItem::with_transformed(
            u32::MAX,
            Layout::new(0.0, 0.0, 32.0, 32.0),
            Layout::new(117.0, 93.0, 32.0, 32.0),
        );
        let context = CollisionContext {
            active_droppable: Some(0),
        };
        group.throughput(Throughput::Elements(u64::from(len)));

        for (name, detector) in detectors {
            group.bench_with_input(BenchmarkId::new(name, len), &droppables, |b, droppables| {
                b.iter(|| black_box(detector(&active, droppables, &context)));
            });
        }
    }

    group.finish();
}

fn bench_pointer_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("drag_drop/sensor_move");

    // Every move re-runs the subscriptions, including collision detection.
    for len in [64_u32, 1_024] {
        group.throughput(Throughput::Elements(u64::from(len)));
        group.bench_function(BenchmarkId::from_parameter(len), |b| {
            let mut dnd = engine(len);
            dnd.sensor_start(u32::MAX, Point::new(16.0, 16.0));
            dnd.drag_start(0);
            let mut step = 0_u32;
            b.iter(|| {
                step = (step + 1) % 256;
                dnd.sensor_move(Point::new(16.0 + f64::from(step), 16.0));
                black_box(dnd.active_droppable_id());
            });
        });
    }

    group.finish();
}

fn bench_recompute_layouts(c: &mut Criterion) {
    let mut group = c.benchmark_group("drag_drop/recompute_layouts");

    // Draggable and droppable share a node, so each node is measured once.
    for len in [64_u32, 1_024] {
        group.throughput(Throughput::Elements(u64::from(len)));
        group.bench_function(BenchmarkId::from_parameter(len), |b| {
            b.iter_batched(
                || engine(len),
                |mut dnd| black_box(dnd.recompute_layouts()),
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_sortable_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("sortable/update");

    for len in [64_u32, 1_024] {
        group.throughput(Throughput::Elements(u64::from(len)));
        group.bench_function(BenchmarkId::from_parameter(len), |b| {
            let mut dnd = engine(len);
            dnd.sensor_start(u32::MAX, Point::new(16.0, 16.0));
            dnd.drag_start(0);
            dnd.sensor_move(Point::new(56.0, 16.0));
            b.iter_batched(
                || SortableContext::new(0..len),
                |mut ctx| black_box(ctx.update(&dnd)),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_detectors,
    bench_pointer_move,
    bench_recompute_layouts,
    bench_sortable_update
);
criterion_main!(benches);
