use criterion::{Criterion, black_box, criterion_group, criterion_main};
use doco_preview::Previewer;

const TUTORIAL: &str = r#"# Initial Server Setup

### Introduction

When you first create a new server, there are a few "configuration steps" you should take
early on as part of the basic setup. This will increase the security of your server (TM).

<$>[note]
**Note:** Replace <^>your_server_ip<^> with the address of your server.
<$>

## Step 1 - Logging in as Root

To log into your server, you will need to know your server's public IP address:

```command
ssh root@<^>your_server_ip<^>
```

<!-- TODO: add screenshots
of the console -->

## Step 2 - Creating a New User

```super_user
adduser <^>sammy<^>
usermod -aG sudo <^>sammy<^>
```

```js
[label server.js]
[secondary_label Output]
const port = <^>3000<^>;
console.log('listening on ' + port);
```

- Read the [firewall guide](https://example.com/ufw) next.
- Or jump to [the conclusion](#conclusion).

> Don't skip the 'firewall' step.

## Conclusion

You now have a solid foundation for your server.
"#;

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(20);

    let previewer = Previewer::from_json(r#"{"rules": "all"}"#).unwrap();
    let large = vec![TUTORIAL; 200].join("\n");

    group.bench_function("tutorial_x200", |b| {
        b.iter(|| {
            let html = previewer.render(black_box(&large)).unwrap();
            black_box(html);
        });
    });

    group.bench_function("tutorial", |b| {
        b.iter(|| {
            let html = previewer.render(black_box(TUTORIAL)).unwrap();
            black_box(html);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
