use crate::geom::{BBox, Bvh, Point3, Tolerance, Triangle3, Vec3, box_mesh};

fn unit_boxes_along_x(count: usize) -> Vec<BBox> {
    (0..count)
        .map(|i| {
            let x = i as f64 * 2.0;
            BBox::new(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0))
        })
        .collect()
}

#[test]
fn bvh_build_rejects_empty_input() {
    assert!(Bvh::build(&[]).is_none());
}

#[test]
fn bvh_root_bounds_enclose_every_primitive() {
    let boxes = unit_boxes_along_x(20);
    let bvh = Bvh::build(&boxes).expect("bvh build");
    let root = bvh.root_bounds();
    assert_eq!(root.min, Point3::new(0.0, 0.0, 0.0));
    assert_eq!(root.max, Point3::new(39.0, 1.0, 1.0));
}

#[test]
fn bvh_ray_candidates_include_every_box_on_the_ray() {
    let boxes = unit_boxes_along_x(10);
    let bvh = Bvh::build(&boxes).expect("bvh build");

    let mut seen = Vec::new();
    bvh.ray_candidates(Point3::new(-1.0, 0.5, 0.5), Vec3::X, 100.0, |idx| {
        seen.push(idx);
        true
    });
    seen.sort_unstable();
    assert_eq!(seen, (0..10).collect::<Vec<_>>());
}

#[test]
fn bvh_ray_candidates_empty_when_ray_misses_root() {
    let boxes = unit_boxes_along_x(10);
    let bvh = Bvh::build(&boxes).expect("bvh build");

    let mut visited = 0;
    bvh.ray_candidates(Point3::new(-1.0, 5.0, 0.5), Vec3::X, 100.0, |_| {
        visited += 1;
        true
    });
    assert_eq!(visited, 0);
}

#[test]
fn bvh_ray_candidates_stop_when_visitor_declines() {
    let boxes = unit_boxes_along_x(10);
    let bvh = Bvh::build(&boxes).expect("bvh build");

    let mut visited = 0;
    bvh.ray_candidates(Point3::new(-1.0, 0.5, 0.5), Vec3::X, 100.0, |_| {
        visited += 1;
        false
    });
    assert_eq!(visited, 1);
}

#[test]
fn bvh_ray_candidates_respect_max_distance() {
    let boxes = unit_boxes_along_x(10);
    let bvh = Bvh::build(&boxes).expect("bvh build");

    let mut seen = Vec::new();
    bvh.ray_candidates(Point3::new(-1.0, 0.5, 0.5), Vec3::X, 3.5, |idx| {
        seen.push(idx);
        true
    });
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1]);
}

#[test]
fn bvh_nearest_matches_brute_force() {
    let mesh = box_mesh([2.0, 1.0, 3.0]);
    let tris: Vec<Triangle3> = mesh.triangles().collect();
    let bounds: Vec<BBox> = tris.iter().map(|t| t.bbox()).collect();
    let bvh = Bvh::build(&bounds).expect("bvh build");

    let queries = [
        Point3::new(5.0, 0.1, 0.2),
        Point3::new(0.1, -4.0, 0.3),
        Point3::new(0.2, 0.1, 0.4),
        Point3::new(-3.0, 3.0, -3.0),
    ];
    for q in queries {
        let (_, d2) = bvh
            .nearest(q, |i| tris[i].closest_point(q).distance_squared_to(q))
            .expect("nearest");
        let brute = tris
            .iter()
            .map(|t| t.closest_point(q).distance_squared_to(q))
            .fold(f64::INFINITY, f64::min);
        assert!(
            Tolerance::LOOSE.approx_eq_f64(d2, brute),
            "query {q:?}: bvh {d2} vs brute {brute}"
        );
    }
}
