use crate::geom::{Point3, Tolerance, Triangle3, Vec3};

fn xy_triangle() -> Triangle3 {
    Triangle3::new(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    )
}

#[test]
fn ray_hits_triangle_from_either_side() {
    let tri = xy_triangle();
    let down = tri
        .intersect_ray(Point3::new(0.25, 0.25, 1.0), Vec3::new(0.0, 0.0, -1.0), Tolerance::DEFAULT)
        .expect("hit from above");
    assert!((down.t - 1.0).abs() < 1e-12);

    let up = tri
        .intersect_ray(Point3::new(0.25, 0.25, -2.0), Vec3::Z, Tolerance::DEFAULT)
        .expect("hit from below");
    assert!((up.t - 2.0).abs() < 1e-12);
}

#[test]
fn ray_misses_outside_and_behind() {
    let tri = xy_triangle();
    assert!(
        tri.intersect_ray(Point3::new(0.9, 0.9, 1.0), Vec3::new(0.0, 0.0, -1.0), Tolerance::DEFAULT)
            .is_none()
    );
    assert!(
        tri.intersect_ray(Point3::new(0.25, 0.25, 1.0), Vec3::Z, Tolerance::DEFAULT)
            .is_none()
    );
    // Parallel to the plane.
    assert!(
        tri.intersect_ray(Point3::new(-1.0, 0.25, 0.0), Vec3::X, Tolerance::DEFAULT)
            .is_none()
    );
}

#[test]
fn closest_point_covers_each_region() {
    let tri = xy_triangle();
    let tol = Tolerance::LOOSE;

    // Interior projects straight down.
    assert!(tol.approx_eq_point3(
        tri.closest_point(Point3::new(0.2, 0.3, 5.0)),
        Point3::new(0.2, 0.3, 0.0)
    ));
    // Vertex regions.
    assert!(tol.approx_eq_point3(tri.closest_point(Point3::new(-1.0, -1.0, 0.0)), tri.a));
    assert!(tol.approx_eq_point3(tri.closest_point(Point3::new(3.0, -0.5, 0.0)), tri.b));
    assert!(tol.approx_eq_point3(tri.closest_point(Point3::new(-0.5, 3.0, 0.0)), tri.c));
    // Edge regions.
    assert!(tol.approx_eq_point3(
        tri.closest_point(Point3::new(0.5, -1.0, 0.0)),
        Point3::new(0.5, 0.0, 0.0)
    ));
    assert!(tol.approx_eq_point3(
        tri.closest_point(Point3::new(1.0, 1.0, 0.0)),
        Point3::new(0.5, 0.5, 0.0)
    ));
}

#[test]
fn area_and_unit_normal() {
    let tri = xy_triangle();
    assert!((tri.area() - 0.5).abs() < 1e-12);
    assert_eq!(tri.unit_normal(), Some(Vec3::Z));

    let degenerate = Triangle3::new(tri.a, tri.a, tri.b);
    assert_eq!(degenerate.area(), 0.0);
    assert!(degenerate.unit_normal().is_none());
}
