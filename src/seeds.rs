//! Built-in sentence pool so the app stays playable without a model or config.

use crate::domain::{Modifier, Sentence, SentenceSource, Tier};
use crate::taxonomy::{ModifierCode as M, SubjectCode};

#[allow(clippy::too_many_arguments)]
fn seed(
  id: &str,
  difficulty: Tier,
  text: &str,
  head_noun: usize,
  main_verb: usize,
  modifiers: &[(usize, usize, M)],
  subject_type: SubjectCode,
  translation: &str,
) -> Sentence {
  Sentence {
    id: id.into(),
    tokens: text.split_whitespace().map(str::to_string).collect(),
    head_noun,
    main_verb,
    modifiers: modifiers
      .iter()
      .map(|&(start, end, code)| Modifier { start, end, code })
      .collect(),
    subject_type,
    translation: translation.into(),
    difficulty,
    source: SentenceSource::Seed,
  }
}

/// Minimal set of built-in sentences, a few per tier.
pub fn seed_sentences() -> Vec<Sentence> {
  use SubjectCode::*;
  use Tier::*;
  vec![
    seed("seed-b1", Basic, "The cat on the sofa sleeps all day .", 1, 5, &[(2, 4, M::Prep)], Noun,
      "소파 위의 고양이는 하루 종일 잔다."),
    seed("seed-b2", Basic, "The boy who lives next door plays the guitar .", 1, 6, &[(2, 5, M::Rel)], Noun,
      "옆집에 사는 소년은 기타를 친다."),
    seed("seed-b3", Basic, "The girl playing the piano is my sister .", 1, 5, &[(2, 4, M::Ing)], Noun,
      "피아노를 치고 있는 소녀는 내 여동생이다."),
    seed("seed-b4", Basic, "The letter written in pencil was hard to read .", 1, 5, &[(2, 4, M::Ed)], Noun,
      "연필로 쓰인 편지는 읽기 어려웠다."),
    seed("seed-b5", Basic, "A basket full of apples sits on the table .", 1, 5, &[(2, 4, M::Adj)], Noun,
      "사과가 가득 든 바구니가 탁자 위에 놓여 있다."),
    seed("seed-b6", Basic, "Everyone in the room laughed .", 0, 4, &[(1, 3, M::Prep)], Pronoun,
      "방 안의 모든 사람이 웃었다."),
    seed("seed-i1", Intermediate, "The decision to close the library upset many students .", 1, 6, &[(2, 5, M::To)], Noun,
      "도서관을 닫기로 한 결정은 많은 학생들을 화나게 했다."),
    seed("seed-i2", Intermediate, "My brother , a doctor in Seoul , works very long hours .", 1, 8, &[(3, 6, M::Appos)], Noun,
      "서울에서 의사로 일하는 내 형은 아주 오랜 시간 일한다."),
    seed("seed-i3", Intermediate, "The man in the gray suit who called yesterday wants a refund .", 1, 9,
      &[(2, 5, M::Prep), (6, 8, M::Rel)], Noun,
      "어제 전화한 회색 정장을 입은 남자는 환불을 원한다."),
    seed("seed-i4", Intermediate, "Students wishing to join the club meet every Friday .", 0, 6, &[(1, 5, M::Ing)], Noun,
      "동아리에 가입하고 싶은 학생들은 매주 금요일에 모인다."),
    seed("seed-a1", Advanced, "The old bridge across the river , built in 1890 , needs urgent repairs .", 2, 11,
      &[(3, 5, M::Prep), (7, 9, M::Ed)], Noun,
      "1890년에 지어진 강을 가로지르는 오래된 다리는 긴급한 수리가 필요하다."),
    seed("seed-a2", Advanced, "The scientist from Kyoto who discovered the enzyme , a quiet woman , received an award .", 1, 13,
      &[(2, 3, M::Prep), (4, 7, M::Rel), (9, 11, M::Appos)], Noun,
      "그 효소를 발견한 교토 출신의 과학자, 조용한 여성인 그녀는 상을 받았다."),
    seed("seed-a3", Advanced, "A plan to reduce traffic in the city center proposed by the mayor faces strong opposition .", 1, 13,
      &[(2, 8, M::To), (9, 12, M::Ed)], Noun,
      "시장이 제안한 도심 교통량을 줄이기 위한 계획은 강한 반대에 부딪혔다."),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn every_seed_is_valid_and_unique() {
    let seeds = seed_sentences();
    let mut ids = HashSet::new();
    for s in &seeds {
      s.validate().unwrap_or_else(|e| panic!("{}: {e}", s.id));
      assert!(ids.insert(s.id.clone()), "duplicate id {}", s.id);
    }
    for tier in [Tier::Basic, Tier::Intermediate, Tier::Advanced] {
      assert!(seeds.iter().any(|s| s.difficulty == tier));
    }
  }

  #[test]
  fn spans_point_at_expected_words() {
    let seeds = seed_sentences();
    let a2 = seeds.iter().find(|s| s.id == "seed-a2").unwrap();
    assert_eq!(a2.tokens[a2.head_noun], "scientist");
    assert_eq!(a2.tokens[a2.main_verb], "received");
    assert_eq!(a2.modifier_text(2), "a quiet woman");
  }
}
