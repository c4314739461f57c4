extern crate glkit;
extern crate rand;

use glkit::math::prelude::*;

fn random() -> Vector2f {
    Vector2f::new(rand::random::<f32>() * 100.0, rand::random::<f32>() * 100.0)
}

fn approx(lhs: Vector2f, rhs: Vector2f) -> bool {
    (lhs.x - rhs.x).abs() < 1e-3 && (lhs.y - rhs.y).abs() < 1e-3
}

#[test]
fn default() {
    assert_eq!(Vector2i::default(), Vector2i::new(0, 0));
    assert_eq!(Vector3f::default(), Vector3f::new(0.0, 0.0, 0.0));
    assert_eq!(Vector4i::default().to_array(), [0; 4]);
}

#[test]
fn accessors() {
    let mut v = Vector4i::new(1, 2, 3, 4);
    assert_eq!((v.x, v.y, v.z, v.w), (1, 2, 3, 4));
    assert_eq!((v[0], v[1], v[2], v[3]), (1, 2, 3, 4));

    v.z = 7;
    v[3] = 8;
    assert_eq!(v, Vector4i::new(1, 2, 7, 8));
}

#[test]
fn arithmetic() {
    assert_eq!(Vector2i::new(1, 2) + Vector2i::new(3, 5), Vector2i::new(4, 7));
    assert_eq!(Vector3i::new(1, 2, 3) - Vector3i::new(3, 2, 1), Vector3i::new(-2, 0, 2));

    let mut v = Vector2i::new(1, 1);
    v += Vector2i::new(2, 3);
    v -= Vector2i::new(1, 0);
    assert_eq!(v, Vector2i::new(2, 4));

    for _ in 0..100 {
        let (a, b, c) = (random(), random(), random());
        assert!(approx(a + b, b + a));
        assert!(approx((a + b) + c, a + (b + c)));
        assert!(approx((a + b) - b, a));

        let sum = a + b;
        assert_eq!(sum.x, a.x + b.x);
        assert_eq!(sum.y, a.y + b.y);
    }
}
