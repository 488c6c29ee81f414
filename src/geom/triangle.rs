use super::{BBox, Point3, Tolerance, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle3 {
    pub a: Point3,
    pub b: Point3,
    pub c: Point3,
}

/// Parametric ray hit: `origin + t * dir`, barycentrics `(1 - u - v, u, v)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub t: f64,
    pub u: f64,
    pub v: f64,
}

impl Triangle3 {
    #[must_use]
    pub const fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self { a, b, c }
    }

    /// Unnormalized winding normal; its length is twice the area.
    #[must_use]
    pub fn normal(self) -> Vec3 {
        self.b.sub_point(self.a).cross(self.c.sub_point(self.a))
    }

    #[must_use]
    pub fn unit_normal(self) -> Option<Vec3> {
        self.normal().normalized()
    }

    #[must_use]
    pub fn area(self) -> f64 {
        self.normal().length() * 0.5
    }

    #[must_use]
    pub fn bbox(self) -> BBox {
        BBox::new(self.a, self.a).expand_point(self.b).expand_point(self.c)
    }

    /// Möller–Trumbore intersection, two-sided. Hits behind the origin are rejected.
    #[must_use]
    pub fn intersect_ray(self, origin: Point3, dir: Vec3, tol: Tolerance) -> Option<RayHit> {
        let edge1 = self.b.sub_point(self.a);
        let edge2 = self.c.sub_point(self.a);
        let h = dir.cross(edge2);
        let det = edge1.dot(h);
        if !det.is_finite() || det.abs() <= tol.eps * edge1.length() * h.length() {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = origin.sub_point(self.a);
        let u = inv_det * s.dot(h);
        if u < -tol.eps || u > 1.0 + tol.eps {
            return None;
        }

        let q = s.cross(edge1);
        let v = inv_det * dir.dot(q);
        if v < -tol.eps || u + v > 1.0 + tol.eps {
            return None;
        }

        let t = inv_det * edge2.dot(q);
        if !t.is_finite() || t < 0.0 {
            return None;
        }
        Some(RayHit { t, u, v })
    }

    /// Closest point on the triangle (Voronoi-region walk).
    #[must_use]
    pub fn closest_point(self, p: Point3) -> Point3 {
        let ab = self.b.sub_point(self.a);
        let ac = self.c.sub_point(self.a);
        let ap = p.sub_point(self.a);

        let d1 = ab.dot(ap);
        let d2 = ac.dot(ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return self.a;
        }

        let bp = p.sub_point(self.b);
        let d3 = ab.dot(bp);
        let d4 = ac.dot(bp);
        if d3 >= 0.0 && d4 <= d3 {
            return self.b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let denom = d1 - d3;
            let v = if denom.abs() > 0.0 { d1 / denom } else { 0.0 };
            return self.a.add_vec(ab * v);
        }

        let cp = p.sub_point(self.c);
        let d5 = ab.dot(cp);
        let d6 = ac.dot(cp);
        if d6 >= 0.0 && d5 <= d6 {
            return self.c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let denom = d2 - d6;
            let w = if denom.abs() > 0.0 { d2 / denom } else { 0.0 };
            return self.a.add_vec(ac * w);
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let denom = (d4 - d3) + (d5 - d6);
            let w = if denom.abs() > 0.0 { (d4 - d3) / denom } else { 0.0 };
            return self.b.add_vec(self.c.sub_point(self.b) * w);
        }

        let sum = va + vb + vc;
        if sum.abs() <= f64::MIN_POSITIVE {
            return self.a;
        }
        let v = vb / sum;
        let w = vc / sum;
        self.a.add_vec(ab * v).add_vec(ac * w)
    }
}
