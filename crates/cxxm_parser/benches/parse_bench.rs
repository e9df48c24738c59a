use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cxxm_core::intern::StringInterner;
use cxxm_options::ParserOptions;
use cxxm_parser::ParseSession;

// A medium-size C++ source with classes, templates and member bodies
const CPP_SOURCE: &str = r#"
namespace geometry {

struct Point {
    double x;
    double y;
};

template <typename T>
class Buffer {
public:
    Buffer() : size_(0), capacity_(16) {}
    ~Buffer() { clear(); }

    void push(const T& value) {
        if (size_ == capacity_) grow();
        data_[size_++] = value;
    }

    T& at(unsigned index) { return data_[index]; }
    unsigned size() const { return size_; }

private:
    void grow() { capacity_ = capacity_ * 2; }
    void clear() { size_ = 0; }

    T* data_;
    unsigned size_;
    unsigned capacity_;
};

enum Shape { Circle, Square, Triangle = 7 };

class Canvas : public Buffer<Point> {
public:
    explicit Canvas(int width, int height);
    virtual ~Canvas();

    double area(Shape shape, double side) const {
        switch (shape) {
        case Circle: return side * side * 3.14159;
        case Square: return side * side;
        default: break;
        }
        return 0.0;
    }

    int count(int limit) {
        int total = 0;
        for (int i = 0; i < limit; ++i) {
            if (i % 2 == 0) total += i; else total -= 1;
        }
        while (total > 100) total = total / 2;
        return total;
    }

private:
    int width_;
    int height_;
};

Canvas::Canvas(int width, int height) : width_(width), height_(height) {}
Canvas::~Canvas() {}

}

using namespace geometry;

int main() {
    Canvas canvas(640, 480);
    Point origin = {0.0, 0.0};
    canvas.push(origin);
    return canvas.count(10) + static_cast<int>(canvas.area(Square, 2.0));
}
"#;

fn bench_parse_cpp(c: &mut Criterion) {
    c.bench_function("parse_cpp_medium", |b| {
        b.iter(|| {
            let mut session = ParseSession::new(ParserOptions::default(), StringInterner::new());
            let file = session.parse_source("bench.cpp", black_box(CPP_SOURCE));
            black_box(session.store().file(file).map(|f| f.declarations.len()))
        })
    });
    c.bench_function("parse_cpp_medium_inline_bodies", |b| {
        b.iter(|| {
            let mut session = ParseSession::new(ParserOptions::inline_bodies(), StringInterner::new());
            let file = session.parse_source("bench.cpp", black_box(CPP_SOURCE));
            black_box(session.store().file(file).map(|f| f.declarations.len()))
        })
    });
}

criterion_group!(benches, bench_parse_cpp);
criterion_main!(benches);
