use criterion::{
    criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion, PlotConfiguration,
    Throughput,
};
use h5sel::{
    dataspace::MemoryDataspace,
    selection::{guess_shape, select, Index, MultiBlockSlice},
};

fn selection_select(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let mut group = c.benchmark_group("selection_select");
    group.plot_config(plot_config);

    for size in [32, 64, 128].iter() {
        let shape = vec![*size; 3];
        let simple = vec![Index::Ellipsis, Index::Integer(0)];
        let multi_block = vec![Index::MultiBlock(MultiBlockSlice::new(0, 4, None, 2).unwrap())];
        let fancy = vec![Index::List((0..*size as i64).step_by(3).collect())];
        group.bench_function(BenchmarkId::new("simple", size), |b| {
            b.iter(|| select::<MemoryDataspace>(&shape, simple.clone(), None).unwrap());
        });
        group.bench_function(BenchmarkId::new("multi_block", size), |b| {
            b.iter(|| select::<MemoryDataspace>(&shape, multi_block.clone(), None).unwrap());
        });
        group.bench_function(BenchmarkId::new("fancy", size), |b| {
            b.iter(|| select::<MemoryDataspace>(&shape, fancy.clone(), None).unwrap());
        });
    }
    group.finish();
}

fn selection_broadcast(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let mut group = c.benchmark_group("selection_broadcast");
    group.plot_config(plot_config);

    for size in [32, 64, 128].iter() {
        let shape = vec![*size; 3];
        let selection = select::<MemoryDataspace>(&shape, Vec::<Index>::new(), None).unwrap();
        let source_shape = vec![*size];
        group.throughput(Throughput::Elements(size * size));
        group.bench_function(BenchmarkId::new("rows", size), |b| {
            b.iter(|| {
                selection
                    .broadcast(&source_shape)
                    .unwrap()
                    .map(Result::unwrap)
                    .count()
            });
        });
    }
    group.finish();
}

fn selection_guess_shape(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection_guess_shape");
    for size in [32, 64, 128].iter() {
        let shape = vec![*size; 3];
        let selection = select::<MemoryDataspace>(
            &shape,
            vec![
                Index::MultiBlock(MultiBlockSlice::new(1, 3, None, 1).unwrap()),
                Index::Slice((2_i64..).into()),
            ],
            None,
        )
        .unwrap();
        group.bench_function(BenchmarkId::new("strided", size), |b| {
            b.iter(|| guess_shape(selection.dataspace()).unwrap());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    selection_select,
    selection_broadcast,
    selection_guess_shape
);
criterion_main!(benches);
