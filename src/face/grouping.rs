//! Neighbor-vote grouping of raw window hits.

use super::Rect;

fn similar(a: &Rect, b: &Rect, eps: f32) -> bool {
    let delta = eps * (a.w.min(b.w) + a.h.min(b.h)) as f32 * 0.5;
    let close = |p: u32, q: u32| (p as f32 - q as f32).abs() <= delta;
    close(a.x, b.x) && close(a.y, b.y) && close(a.x + a.w, b.x + b.w) && close(a.y + a.h, b.y + b.h)
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Cluster similar rectangles and average each cluster.
///
/// Clusters with `min_neighbors` or fewer members are dropped, as are
/// averaged rectangles lying inside a stronger neighbor. Returned pairs are
/// `(average, member_count)`, sorted by descending count.
pub fn group_rectangles(rects: &[Rect], min_neighbors: usize, eps: f32) -> Vec<(Rect, usize)> {
    let mut parent: Vec<usize> = (0..rects.len()).collect();
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if similar(&rects[i], &rects[j], eps) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    let mut sums: Vec<(u64, u64, u64, u64, usize)> = vec![(0, 0, 0, 0, 0); rects.len()];
    for (i, r) in rects.iter().enumerate() {
        let root = find(&mut parent, i);
        let s = &mut sums[root];
        s.0 += u64::from(r.x);
        s.1 += u64::from(r.y);
        s.2 += u64::from(r.w);
        s.3 += u64::from(r.h);
        s.4 += 1;
    }

    let avg = |total: u64, n: usize| (total as f64 / n as f64).round() as u32;
    let groups: Vec<(Rect, usize)> = sums
        .into_iter()
        .filter(|s| s.4 > min_neighbors)
        .map(|(x, y, w, h, n)| (Rect::new(avg(x, n), avg(y, n), avg(w, n), avg(h, n)), n))
        .collect();

    let mut kept: Vec<(Rect, usize)> = groups
        .iter()
        .enumerate()
        .filter(|(i, (inner, n1))| {
            !groups.iter().enumerate().any(|(j, (outer, n2))| {
                if *i == j {
                    return false;
                }
                let dx = (outer.w as f32 * eps).round() as i64;
                let dy = (outer.h as f32 * eps).round() as i64;
                let inside = i64::from(inner.x) >= i64::from(outer.x) - dx
                    && i64::from(inner.y) >= i64::from(outer.y) - dy
                    && i64::from(inner.x + inner.w) <= i64::from(outer.x + outer.w) + dx
                    && i64::from(inner.y + inner.h) <= i64::from(outer.y + outer.h) + dy;
                inside && (outer.area() > inner.area()) && (*n2 > (*n1).max(3) || *n1 < 3)
            })
        })
        .map(|(_, g)| *g)
        .collect();

    kept.sort_by(|a, b| b.1.cmp(&a.1));
    kept
}
