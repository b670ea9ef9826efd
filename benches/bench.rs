// Criterion benchmarks for Recipe Match

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use recipe_match::core::{rank_by_overlap, rank_compatible_ingredients, QueryCatalog};
use recipe_match::models::{Recipe, RecipeNeighborhood};

const PANTRY: [&str; 24] = [
    "chicken", "garlic", "onion", "rice", "salt", "pepper", "butter", "flour", "egg", "milk", "tomato", "basil",
    "lemon", "thyme", "carrot", "celery", "potato", "cheese", "cream", "sugar", "ginger", "soy", "tofu", "corn",
];

fn create_recipe(id: usize) -> RecipeNeighborhood {
    let ingredients = (0..4 + id % 6)
        .map(|k| PANTRY[(id * 7 + k * 5) % PANTRY.len()].to_string())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();

    RecipeNeighborhood {
        recipe: Recipe::with_id(id as i64),
        ingredients,
        review_ratings: (0..id % 4).map(|r| 3.0 + (r as f64) * 0.5).collect(),
    }
}

fn known() -> Vec<String> {
    vec!["chicken".to_string(), "garlic".to_string(), "lemon".to_string()]
}

fn bench_overlap_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlap_ranking");

    for size in [100, 1_000, 10_000] {
        let recipes: Vec<RecipeNeighborhood> = (0..size).map(create_recipe).collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &recipes, |b, recipes| {
            b.iter(|| rank_by_overlap(black_box(&known()), recipes.clone(), Some(25)));
        });
    }

    group.finish();
}

fn bench_compatibility_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("compatibility_ranking");

    for size in [100, 1_000, 10_000] {
        let recipes: Vec<RecipeNeighborhood> = (0..size).map(create_recipe).collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &recipes, |b, recipes| {
            b.iter(|| rank_compatible_ingredients(black_box(&known()), black_box(recipes), Some(25)));
        });
    }

    group.finish();
}

fn bench_catalog_rendering(c: &mut Criterion) {
    let catalog = QueryCatalog::standard();

    c.bench_function("catalog_render_all", |b| {
        b.iter(|| {
            for (_, template) in catalog.entries() {
                black_box(template.to_request_body(black_box(10)));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_overlap_ranking,
    bench_compatibility_ranking,
    bench_catalog_rendering
);
criterion_main!(benches);
