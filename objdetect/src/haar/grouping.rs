use cv_core::Rect;

fn similar(a: &Rect, b: &Rect, eps: f64) -> bool {
    let delta = eps * (a.width.min(b.width) as f64 + a.height.min(b.height) as f64) * 0.5;
    let close = |p: u32, q: u32| (p as f64 - q as f64).abs() <= delta;
    close(a.x, b.x) && close(a.y, b.y) && close(a.right(), b.right()) && close(a.bottom(), b.bottom())
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Cluster raw detections and average each cluster.
///
/// Rectangles are in the same cluster when their corners lie within
/// `eps * mean(min side)` of each other (transitively). Clusters with
/// `min_neighbors` members or fewer are dropped, as are averaged rectangles
/// nested inside a stronger one. `min_neighbors == 0` returns the input
/// unchanged.
pub fn group_rectangles(rects: &[Rect], min_neighbors: u32, eps: f64) -> Vec<Rect> {
    if min_neighbors == 0 || rects.is_empty() {
        return rects.to_vec();
    }

    let n = rects.len();
    let mut parent: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            if similar(&rects[i], &rects[j], eps) {
                let ri = find(&mut parent, i);
                let rj = find(&mut parent, j);
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    // Per-cluster coordinate sums and member counts, in first-seen order.
    let mut label_of_root = vec![usize::MAX; n];
    let mut sums: Vec<([u64; 4], u32)> = Vec::new();
    for (i, r) in rects.iter().enumerate() {
        let root = find(&mut parent, i);
        if label_of_root[root] == usize::MAX {
            label_of_root[root] = sums.len();
            sums.push(([0; 4], 0));
        }
        let entry = &mut sums[label_of_root[root]];
        entry.0[0] += r.x as u64;
        entry.0[1] += r.y as u64;
        entry.0[2] += r.width as u64;
        entry.0[3] += r.height as u64;
        entry.1 += 1;
    }

    let averaged: Vec<(Rect, u32)> = sums
        .iter()
        .map(|(s, count)| {
            let c = *count as f64;
            let avg = |v: u64| (v as f64 / c).round() as u32;
            (Rect::new(avg(s[0]), avg(s[1]), avg(s[2]), avg(s[3])), *count)
        })
        .collect();

    let mut out = Vec::new();
    for (i, &(r1, n1)) in averaged.iter().enumerate() {
        if n1 <= min_neighbors {
            continue;
        }
        let nested = averaged.iter().enumerate().any(|(j, &(r2, n2))| {
            if j == i || n2 <= min_neighbors {
                return false;
            }
            let dx = (r2.width as f64 * eps).round() as i64;
            let dy = (r2.height as f64 * eps).round() as i64;
            r1.x as i64 >= r2.x as i64 - dx
                && r1.y as i64 >= r2.y as i64 - dy
                && r1.right() as i64 <= r2.right() as i64 + dx
                && r1.bottom() as i64 <= r2.bottom() as i64 + dy
                && (n2 > n1.max(3) || n1 < 3)
        });
        if !nested {
            out.push(r1);
        }
    }
    out
}
